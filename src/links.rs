//! Rewriting of `src`/`href` links inside parsed content.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;
use url::Url;

use crate::cartridge::{Cartridge, StaticPathRegistry, OLX_STATIC_DIR};
use crate::content::TextTree;

static LINK_ATTRIBUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(src|href)\s*=\s*"(.+?)""#).unwrap());

const JUMP_TO_ID: &str = "/jump_to_id/";

/// Placeholder markers of exported links, in the order they are tested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkKeyword {
    ImsCcFilebase,
    WikiReference,
    ExternalTools,
    CanvasObjectReference,
}

impl LinkKeyword {
    const PRIORITY: [LinkKeyword; 4] = [
        LinkKeyword::ImsCcFilebase,
        LinkKeyword::WikiReference,
        LinkKeyword::ExternalTools,
        LinkKeyword::CanvasObjectReference,
    ];

    fn marker(&self) -> &'static str {
        match self {
            LinkKeyword::ImsCcFilebase => "IMS-CC-FILEBASE",
            LinkKeyword::WikiReference => "WIKI_REFERENCE",
            LinkKeyword::ExternalTools => "external_tools",
            LinkKeyword::CanvasObjectReference => "CANVAS_OBJECT_REFERENCE",
        }
    }

    fn find(link: &str) -> Option<LinkKeyword> {
        Self::PRIORITY
            .into_iter()
            .find(|keyword| link.contains(keyword.marker()))
    }
}

/// Resolves cartridge placeholders and relative links to OLX addresses.
///
/// Rewrites replace the matched link text everywhere in the string, so the
/// surrounding markup is left byte for byte as it was.
pub struct StaticLinkRewriter<'a> {
    cartridge: &'a Cartridge,
    relative_links_source: Option<&'a str>,
    static_paths: &'a StaticPathRegistry,
}

impl<'a> StaticLinkRewriter<'a> {
    pub fn new(
        cartridge: &'a Cartridge,
        relative_links_source: Option<&'a str>,
        static_paths: &'a StaticPathRegistry,
    ) -> Self {
        Self {
            cartridge,
            relative_links_source,
            static_paths,
        }
    }

    /// Rewrites every string leaf of `content` in place.
    pub fn rewrite<C: TextTree + ?Sized>(&self, content: &mut C) {
        content.visit_text(&mut |text| {
            if LINK_ATTRIBUTE.is_match(text) {
                *text = self.process_static_links(text);
            }
        });
    }

    pub fn process_static_links(&self, html: &str) -> String {
        let links: Vec<&str> = LINK_ATTRIBUTE
            .captures_iter(html)
            .filter_map(|captures| captures.get(2))
            .map(|link| link.as_str())
            .collect();

        let mut html = html.to_string();
        for link in links {
            html = match LinkKeyword::find(link) {
                Some(LinkKeyword::ImsCcFilebase) => html.replace(link, &ims_cc_filebase(link)),
                Some(LinkKeyword::WikiReference) => self.wiki_reference(link, html),
                Some(LinkKeyword::ExternalTools) => html.replace(link, &external_tool_url(link)),
                Some(LinkKeyword::CanvasObjectReference) => {
                    html.replace(link, &canvas_object_reference(link))
                }
                None => self.relative_external_link(link, html),
            };
        }
        html
    }

    fn wiki_reference(&self, link: &str, html: String) -> String {
        let search_key = percent_decode(link).replace("$WIKI_REFERENCE$/pages/", "");
        let search_key = format!("{}.html", strip_query(&search_key));

        let hrefs = self.cartridge.resource_id_by_href();
        match hrefs.iter().find(|(href, _)| href.ends_with(&search_key)) {
            Some((_, identifier)) => html.replace(link, &format!("{}{}", JUMP_TO_ID, identifier)),
            None => {
                warn!("Unable to process Wiki link - {}", link);
                html
            }
        }
    }

    fn relative_external_link(&self, link: &str, html: String) -> String {
        let Some(source) = self.relative_links_source else {
            return html;
        };
        if self.static_paths.contains(link) || is_olx_address(link) || Url::parse(link).is_ok() {
            return html;
        }

        match Url::parse(source).and_then(|base| base.join(link)) {
            Ok(url) => html.replace(link, url.as_str()),
            Err(err) => {
                warn!(source, link, %err, "unable to resolve relative link");
                html
            }
        }
    }
}

/// `$IMS-CC-FILEBASE$/a%20b.png?x=1` becomes `/static/a b.png`.
fn ims_cc_filebase(link: &str) -> String {
    let static_dir = format!("/{}", OLX_STATIC_DIR);
    let new_link = percent_decode(link).replace("$IMS-CC-FILEBASE$", &static_dir);
    strip_query(&new_link).replace("&amp;", "&")
}

fn canvas_object_reference(link: &str) -> String {
    percent_decode(link).replace("$CANVAS_OBJECT_REFERENCE$/quizzes/", JUMP_TO_ID)
}

/// The `url` query parameter of a Canvas external tool launch link.
fn external_tool_url(link: &str) -> String {
    let query = link
        .split_once('?')
        .map(|(_, query)| query.split('#').next().unwrap_or_default())
        .unwrap_or_default();
    let query = html_escape::decode_html_entities(query);

    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, value)| key == "url" && !value.is_empty())
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default()
}

fn strip_query(link: &str) -> &str {
    link.split('?').next().unwrap_or(link)
}

// Links produced by an earlier rewrite. Skipping them keeps a second pass a no-op.
fn is_olx_address(link: &str) -> bool {
    link.starts_with(&format!("/{}/", OLX_STATIC_DIR)) || link.starts_with(JUMP_TO_ID)
}

pub(crate) fn percent_decode(value: &str) -> String {
    String::from_utf8_lossy(&urlencoding::decode_binary(value.as_bytes())).into_owned()
}
