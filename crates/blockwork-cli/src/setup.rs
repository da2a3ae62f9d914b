//! Turns a [`Config`] into a ready-to-use [`TemplateExtension`].

use std::sync::Arc;

use anyhow::{Context, Result};
use blockwork_config::{Config, ServiceConfig, TagConfig};
use blockwork_engine::registration::{
    BlockPass, DependencyInjectionExtension, ServiceDefinition, ServiceDefinitions, ServiceMap,
    ServiceTag, TYPE_EXTENSION_TAG, TYPE_GUESSER_TAG, TYPE_TAG,
};
use blockwork_engine::{BlockFactory, BlockRegistry, core_extension};
use blockwork_syntax::TagSet;
use blockwork_template::TemplateExtension;
use log::{debug, info, warn};

use crate::types::{self, Builtin};

/// Services registered when the configuration declares none.
pub fn default_services() -> Vec<ServiceConfig> {
    let service = |id: &str, class: &str, tag: TagConfig| ServiceConfig {
        id: id.to_string(),
        class: class.to_string(),
        public: true,
        tags: vec![tag],
    };
    let tag = |name: &str| TagConfig {
        name: name.to_string(),
        attributes: Default::default(),
    };

    let mut help = tag(TYPE_EXTENSION_TAG);
    help.attributes
        .insert("extended_type".to_string(), "text".to_string());

    vec![
        service("blockwork.type.text", "text", tag(TYPE_TAG)),
        service("blockwork.type.checkbox", "checkbox", tag(TYPE_TAG)),
        service("blockwork.type.panel", "panel", tag(TYPE_TAG)),
        service("blockwork.type_extension.help", "help", help),
        service(
            "blockwork.type_guesser.property_name",
            "property_name_guesser",
            tag(TYPE_GUESSER_TAG),
        ),
    ]
}

fn definitions(services: &[ServiceConfig]) -> ServiceDefinitions {
    services
        .iter()
        .map(|service| {
            service.tags.iter().fold(
                ServiceDefinition::new(&service.id, &service.class).with_public(service.public),
                |definition, tag| {
                    let tag = tag
                        .attributes
                        .iter()
                        .fold(ServiceTag::new(&tag.name), |t, (k, v)| t.with_attribute(k, v));
                    definition.with_tag(tag)
                },
            )
        })
        .collect()
}

/// Instances for every service whose class is built in. Other services stay
/// unresolvable and fail when the registry is built.
fn locator(services: &[ServiceConfig]) -> ServiceMap {
    services
        .iter()
        .fold(ServiceMap::new(), |map, service| match types::builtin(&service.class) {
            Some(Builtin::Type(t)) => map.with_type(&service.id, t),
            Some(Builtin::Extension(e)) => map.with_type_extension(&service.id, e),
            Some(Builtin::Guesser(g)) => map.with_type_guesser(&service.id, g),
            None => {
                warn!(
                    "No built-in service for class \"{}\" of \"{}\"",
                    service.class, service.id
                );
                map
            }
        })
}

pub fn registry(config: &Config) -> Result<BlockRegistry> {
    let services = if config.services.is_empty() {
        debug!("No services configured, using the built-in ones");
        default_services()
    } else {
        config.services.clone()
    };

    let arguments = BlockPass
        .process(&definitions(&services))
        .context("Registration pass failed")?;
    let extension = DependencyInjectionExtension::new(&locator(&services), &arguments)
        .context("Unable to instantiate block services")?;

    Ok(BlockRegistry::new(vec![
        Box::new(core_extension()),
        Box::new(extension),
    ])?)
}

pub fn extension(config: &Config) -> Result<TemplateExtension> {
    let registry = Arc::new(registry(config)?);
    let tags = TagSet::new(registry.list_registered_type_names());

    let mut theme = types::theme();
    for file in config.fragment_files()? {
        let source = std::fs::read_to_string(&file.path)
            .with_context(|| format!("Failed to read theme fragment {}", file.path.display()))?;
        theme
            .add_template_fragment(&file.name, &source, &tags)
            .with_context(|| format!("Invalid theme fragment {}", file.path.display()))?;
        info!("Loaded theme fragment \"{}\" from {}", file.name, file.path.display());
    }

    Ok(TemplateExtension::new(
        BlockFactory::new(registry),
        Arc::new(theme),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockwork_config::ThemeConfig;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[test]
    fn default_services_register_built_in_types() {
        let registry = registry(&Config::default()).unwrap();
        let names: Vec<String> = registry.list_registered_type_names().into_iter().collect();
        assert_eq!(names, vec!["block", "checkbox", "panel", "raw", "text"]);
        assert!(registry.type_guesser().is_some());
    }

    #[test]
    fn configured_services_replace_the_defaults() {
        let config = Config {
            services: vec![ServiceConfig {
                id: "app.text".to_string(),
                class: "text".to_string(),
                public: true,
                tags: vec![TagConfig {
                    name: TYPE_TAG.to_string(),
                    attributes: BTreeMap::new(),
                }],
            }],
            ..Config::default()
        };

        let names: Vec<String> = registry(&config)
            .unwrap()
            .list_registered_type_names()
            .into_iter()
            .collect();
        assert_eq!(names, vec!["block", "raw", "text"]);
    }

    #[test]
    fn unknown_classes_cannot_be_resolved() {
        let config = Config {
            services: vec![ServiceConfig {
                id: "app.slider".to_string(),
                class: "slider".to_string(),
                public: true,
                tags: vec![TagConfig {
                    name: TYPE_TAG.to_string(),
                    attributes: BTreeMap::new(),
                }],
            }],
            ..Config::default()
        };

        let err = registry(&config).unwrap_err();
        assert_eq!(
            format!("{:#}", err),
            "Unable to instantiate block services: Invalid argument: The service \"app.slider\" cannot be resolved"
        );
    }

    #[test]
    fn built_in_theme_renders_forms() {
        let extension = extension(&Config::default()).unwrap();
        let html = extension
            .render_str(
                "{% sblock_panel id='f' legend='Account' %}\
                 {% sblock_text block_name='email' help='Never shared' :%}\
                 {% sblock_checkbox block_name='is_admin' data=true :%}\
                 {% endsblock %}",
                &BTreeMap::new(),
            )
            .unwrap();

        assert_eq!(
            html,
            "<fieldset id=\"f\"><legend>Account</legend>\
             <div><label for=\"f_email\">Email</label><small>Never shared</small></div>\
             <div><label for=\"f_is_admin\">Is admin</label><input type=\"checkbox\" id=\"f_is_admin\" checked></div>\
             </fieldset>"
        );
    }

    #[test]
    fn theme_files_override_fragments() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("text_widget.html"),
            "<input name=\"{{ full_name }}\" value=\"{{ value }}\">",
        )
        .unwrap();
        let config = Config {
            theme: ThemeConfig {
                fragments: vec![format!("{}/*.html", temp_dir.path().display())],
            },
            services: vec![],
        };

        let html = extension(&config)
            .unwrap()
            .render_str("{% sblock_text id='q' data='a&b' :%}", &BTreeMap::new())
            .unwrap();
        assert_eq!(html, "<input name=\"q\" value=\"a&amp;b\">");
    }
}
