pub mod html;
pub mod script;
pub mod text;

#[cfg(test)]
mod tests;

use crate::config::{AboutPositions, LayoutConfig};
use crate::error::CrawlError;
use crate::results::{About, Update};
use crate::utils;
use scraper::{ElementRef, Html, Selector};
use script::{LiteralPatterns, ScriptValues};
use std::collections::BTreeSet;
use std::sync::Arc;
use url::Url;

/// Compiled form of [`LayoutConfig`]: where each detail field lives
pub struct Layout {
    title: Selector,
    about_sections: Selector,
    about_positions: AboutPositions,
    amount_blocks: Selector,
    update_blocks: Selector,
    update_text: Selector,
    content_container: Selector,
    anchors: Selector,
    scripts: Selector,
    script_values: Arc<dyn ScriptValues>,
}

impl Layout {
    pub fn new(config: &LayoutConfig) -> Result<Self, CrawlError> {
        Ok(Self {
            title: html::selector("title", &config.title)?,
            about_sections: html::selector("about_sections", &config.about_sections)?,
            about_positions: config.about_positions,
            amount_blocks: html::selector("amount_blocks", &config.amount_blocks)?,
            update_blocks: html::selector("update_blocks", &config.update_blocks)?,
            update_text: html::selector("update_text", &config.update_text)?,
            content_container: html::selector("content_container", &config.content_container)?,
            anchors: html::selector("anchors", "a[href]")?,
            scripts: html::selector("scripts", "script")?,
            script_values: Arc::new(LiteralPatterns::from_layout(config)?),
        })
    }

    /// Replaces how amounts and timestamps are read out of inline scripts
    pub fn with_script_values(mut self, script_values: Arc<dyn ScriptValues>) -> Self {
        self.script_values = script_values;
        self
    }
}

/// Everything a detail page contributes to a bounty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailFields {
    pub title: String,
    pub min_bounty: Option<u64>,
    pub cur_bounty: Option<u64>,
    pub about: About,
    pub updates: Vec<Update>,
    pub content_links: Vec<String>,
}

/// A parsed detail page together with the URL it was fetched from
pub struct DetailDocument {
    url: Url,
    html: Html,
}

impl DetailDocument {
    pub fn parse(url: Url, body: &str) -> Self {
        Self {
            url,
            html: Html::parse_document(body),
        }
    }

    /// Extracts every detail field. Each field is read independently and a
    /// miss leaves only that field empty; the title alone is required.
    pub fn extract(&self, layout: &Layout) -> Result<DetailFields, CrawlError> {
        let title = self.title(layout).ok_or(CrawlError::MissingField("title"))?;
        let (min_bounty, cur_bounty) = self.amounts(layout);

        Ok(DetailFields {
            title,
            min_bounty,
            cur_bounty,
            about: self.about(layout),
            updates: self.updates(layout),
            content_links: self.content_links(layout),
        })
    }

    pub fn title(&self, layout: &Layout) -> Option<String> {
        self.html
            .select(&layout.title)
            .find_map(html::element_text)
    }

    /// Minimum and current amount, read from the first and second amount block
    pub fn amounts(&self, layout: &Layout) -> (Option<u64>, Option<u64>) {
        let blocks: Vec<ElementRef<'_>> = self.html.select(&layout.amount_blocks).collect();
        let amount_at = |position: usize| {
            let block = blocks.get(position)?;
            layout
                .script_values
                .amount(&html::script_text(*block, &layout.scripts))
        };
        (amount_at(0), amount_at(1))
    }

    pub fn about(&self, layout: &Layout) -> About {
        let sections: Vec<ElementRef<'_>> = self.html.select(&layout.about_sections).collect();
        let section_at = |position: usize| sections.get(position).and_then(|s| html::element_text(*s));
        let positions = layout.about_positions;

        About {
            goal: section_at(positions.goal),
            why: section_at(positions.why),
            requirements: section_at(positions.requirements),
        }
    }

    /// Updates come as pairs of blocks: a date block then a text block. A
    /// trailing unpaired block is ignored and a pair that cannot be read is
    /// skipped on its own.
    pub fn updates(&self, layout: &Layout) -> Vec<Update> {
        let blocks: Vec<ElementRef<'_>> = self.html.select(&layout.update_blocks).collect();
        if blocks.len() % 2 == 1 {
            ::log::debug!("Ignoring unpaired update block on {}", self.url);
        }

        blocks
            .chunks_exact(2)
            .enumerate()
            .filter_map(|(index, pair)| {
                let update = read_update(layout, pair[0], pair[1]);
                if update.is_none() {
                    ::log::debug!("Skipping unreadable update #{} on {}", index, self.url);
                }
                update
            })
            .collect()
    }

    /// Every link inside the content container, made absolute and deduplicated
    pub fn content_links(&self, layout: &Layout) -> Vec<String> {
        let links: BTreeSet<String> = self
            .html
            .select(&layout.content_container)
            .flat_map(|container| html::hrefs(container, &layout.anchors))
            .filter_map(|href| utils::resolve_link(&self.url, href))
            .collect();
        links.into_iter().collect()
    }
}

fn read_update(layout: &Layout, date_block: ElementRef<'_>, text_block: ElementRef<'_>) -> Option<Update> {
    let date = layout
        .script_values
        .timestamp(&html::script_text(date_block, &layout.scripts))?;
    let text = text_block
        .select(&layout.update_text)
        .find_map(html::element_text)?;
    Some(Update { date, text })
}
