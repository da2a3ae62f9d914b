use anyhow::{Context, Result, bail};
use blockwork_config::Config;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::{env, process};

mod setup;
mod types;

const USAGE: &str = "Usage: blockwork [--config <path>] <command>

Commands:
  render <template>          Render a template file to stdout
  types                      List the registered block types and their tags
  guess <class> <property>   Guess the block type of a class property";

#[derive(Debug, PartialEq)]
enum Command {
    Render(PathBuf),
    Types,
    Guess { class: String, property: String },
}

#[derive(Debug, PartialEq)]
struct Args {
    config_path: Option<PathBuf>,
    command: Command,
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut config_path = None;
    let mut positional = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            let Some(path) = iter.next() else {
                bail!("--config needs a path");
            };
            config_path = Some(PathBuf::from(path));
        } else {
            positional.push(arg.as_str());
        }
    }

    let command = match positional.as_slice() {
        ["render", template] => Command::Render(PathBuf::from(template)),
        ["types"] => Command::Types,
        ["guess", class, property] => Command::Guess {
            class: class.to_string(),
            property: property.to_string(),
        },
        _ => bail!("Unrecognised arguments"),
    };
    Ok(Args {
        config_path,
        command,
    })
}

fn load_config(config_path: Option<PathBuf>) -> Result<Config> {
    let config_path = config_path.unwrap_or_else(Config::config_path);
    log::info!("Config path: {}", config_path.display());

    match Config::load_from_path(&config_path)? {
        Some(config) => Ok(config),
        None => {
            log::info!("No config file found, using built-in block types");
            Ok(Config::default())
        }
    }
}

fn run(args: Args) -> Result<()> {
    let config = load_config(args.config_path)?;

    match args.command {
        Command::Render(template_path) => {
            let source = std::fs::read_to_string(&template_path)
                .with_context(|| format!("Failed to read template {}", template_path.display()))?;
            let extension = setup::extension(&config)?;
            let html = extension
                .render_str(&source, &BTreeMap::new())
                .with_context(|| format!("Failed to render {}", template_path.display()))?;
            println!("{html}");
        }
        Command::Types => {
            let registry = setup::registry(&config)?;
            for name in registry.list_registered_type_names() {
                let resolved = registry.resolve_type(&name)?;
                println!("{name}\t{}", resolved.block_prefixes().join(" > "));
            }
        }
        Command::Guess { class, property } => {
            let registry = setup::registry(&config)?;
            match registry
                .type_guesser()
                .and_then(|guesser| guesser.guess_type(&class, &property))
            {
                Some(guess) => println!("{} ({:?})", guess.type_name, guess.confidence),
                None => println!("No guess for {class}.{property}"),
            }
        }
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let args = match parse_args(&args) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("{USAGE}");
            process::exit(1);
        }
    };

    if let Err(e) = run(args) {
        log::error!("{e:#}");
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_render_with_config() {
        assert_eq!(
            parse_args(&args(&["--config", "blocks.toml", "render", "page.html"])).unwrap(),
            Args {
                config_path: Some(PathBuf::from("blocks.toml")),
                command: Command::Render(PathBuf::from("page.html")),
            }
        );
    }

    #[test]
    fn parses_guess() {
        assert_eq!(
            parse_args(&args(&["guess", "User", "is_admin"])).unwrap().command,
            Command::Guess {
                class: "User".to_string(),
                property: "is_admin".to_string(),
            }
        );
    }

    #[test]
    fn rejects_incomplete_commands() {
        assert!(parse_args(&args(&["render"])).is_err());
        assert!(parse_args(&args(&["types", "--config"])).is_err());
    }

    #[test]
    fn missing_config_falls_back_to_defaults() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = load_config(Some(temp_dir.path().join("none.toml"))).unwrap();
        assert_eq!(config, Config::default());
    }
}
