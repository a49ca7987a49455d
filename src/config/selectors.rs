//! Compiled CSS selectors for the configured markup markers

use crate::config::types::MarkupConfig;
use crate::ConfigError;
use scraper::Selector;

/// Every selector the extraction pipeline needs, compiled once per run
#[derive(Debug, Clone)]
pub struct SiteSelectors {
    /// The gallery container (`div.<container-class>`)
    pub container: Selector,
    /// One entry table (`table.<entry-class...>`)
    pub entry: Selector,
    /// An entry's positional cells (`td.<cell-class>`)
    pub cell: Selector,
    /// Inner text wrapper of the date and title cells
    pub text_container: Selector,
    /// Thumbnail links inside an image cell
    pub thumbnail: Selector,
    /// Media container on a detail page (`div#<detail-container-id>`)
    pub detail_container: Selector,
    /// The media element inside the detail container
    pub media: Selector,
    container_source: String,
}

impl SiteSelectors {
    /// Compiles the markers of a [`MarkupConfig`]
    ///
    /// # Returns
    ///
    /// * `Ok(SiteSelectors)` - All markers compiled
    /// * `Err(ConfigError::InvalidSelector)` - A marker is empty or not a valid CSS name
    pub fn compile(markup: &MarkupConfig) -> Result<Self, ConfigError> {
        let container_source = class_selector("div", &markup.container_class)?;

        Ok(Self {
            container: parse(&container_source)?,
            entry: parse(&class_selector("table", &markup.entry_class)?)?,
            cell: parse(&class_selector("td", &markup.cell_class)?)?,
            text_container: parse(markup.text_container.trim())?,
            thumbnail: parse("a")?,
            detail_container: parse(&format!("div#{}", markup.detail_container_id.trim()))?,
            media: parse("img")?,
            container_source,
        })
    }

    /// The textual form of the container selector, for error reports
    pub fn container_source(&self) -> &str {
        &self.container_source
    }
}

/// Builds `tag.class1.class2` from a space separated class list
fn class_selector(tag: &str, classes: &str) -> Result<String, ConfigError> {
    let mut selector = tag.to_string();
    for class in classes.split_whitespace() {
        selector.push('.');
        selector.push_str(class);
    }

    if selector == tag {
        return Err(ConfigError::InvalidSelector(format!(
            "class list for <{}> cannot be empty",
            tag
        )));
    }

    Ok(selector)
}

fn parse(source: &str) -> Result<Selector, ConfigError> {
    Selector::parse(source)
        .map_err(|e| ConfigError::InvalidSelector(format!("'{}': {:?}", source, e)))
}
