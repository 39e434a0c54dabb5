use std::io;
use std::io::ErrorKind;

use ramhorns::Template;

use crate::post_repository::BlogPost;
use crate::view::seo::{description_of, post_url};

#[derive(ramhorns::Content)]
struct ListPage<'a> {
    site_title: &'a str,
    site_description: &'a str,
    current_tag: Option<&'a str>,
    showing_drafts: bool,
    post_list: Vec<PostItem<'a>>,
    tags: Vec<ViewTag<'a>>,
    page_list: Vec<ViewPagination>,
    show_pagination: bool,
}

#[derive(ramhorns::Content)]
struct PostItem<'a> {
    date: &'a str,
    link: String,
    title: &'a str,
    subtitle: Option<&'a str>,
    description: String,
    tags: Vec<ItemTag<'a>>,
    draft: bool,
}

#[derive(ramhorns::Content)]
struct ItemTag<'a> {
    tag: &'a str,
}

#[derive(ramhorns::Content)]
struct ViewTag<'a> {
    tag: &'a str,
    count: usize,
    link: String,
    selected: bool,
}

#[derive(ramhorns::Content)]
struct ViewPagination {
    current: bool,
    number: u32,
    link: String,
}

/// What the list page is currently showing, carried over to the pagination and tag links.
pub struct ListState<'a> {
    pub tag: Option<&'a str>,
    pub show_drafts: bool,
    pub cur_page: u32,
    pub page_count: u32,
}

impl ListState<'_> {
    fn link(&self, tag: Option<&str>, page: u32) -> String {
        let mut params: Vec<(&str, String)> = vec![];
        if let Some(tag) = tag {
            params.push(("tag", tag.to_string()));
        }
        if self.show_drafts {
            params.push(("show_drafts", "true".to_string()));
        }
        if page > 1 {
            params.push(("page", page.to_string()));
        }

        match serde_urlencoded::to_string(&params) {
            Ok(query) if !query.is_empty() => format!("/?{}", query),
            _ => "/".to_string(),
        }
    }
}

pub struct ListRenderer<'a> {
    pub template: Template<'a>,
    pub site_title: &'a str,
    pub site_description: &'a str,
}

impl<'a> ListRenderer<'a> {
    pub fn new(list_tpl_src: &'a str, site_title: &'a str, site_description: &'a str) -> io::Result<ListRenderer<'a>> {
        let template = match Template::new(list_tpl_src) {
            Ok(x) => x,
            Err(e) => {
                return Err(io::Error::new(ErrorKind::InvalidInput, format!("Error parsing list template: {}", e)));
            }
        };

        Ok(ListRenderer {
            template,
            site_title,
            site_description,
        })
    }

    pub fn render(&self, posts: &[BlogPost], tag_counts: &[(String, usize)], state: &ListState) -> String {
        let post_list = posts.iter()
            .map(|post| PostItem {
                date: post.frontmatter.date.as_str(),
                link: post_url("", &post.slug),
                title: post.frontmatter.title.as_str(),
                subtitle: post.frontmatter.subtitle.as_deref().filter(|s| !s.is_empty()),
                description: description_of(&post.frontmatter),
                tags: post.frontmatter.tag.iter().map(|t| ItemTag { tag: t.as_str() }).collect(),
                draft: post.frontmatter.draft,
            })
            .collect();

        let tags = tag_counts.iter()
            .map(|(tag, count)| {
                let selected = state.tag == Some(tag.as_str());
                ViewTag {
                    tag: tag.as_str(),
                    count: *count,
                    // Clicking the selected tag again clears the filter
                    link: state.link(if selected { None } else { Some(tag.as_str()) }, 1),
                    selected,
                }
            })
            .collect();

        let page_list = (1..=state.page_count)
            .map(|number| ViewPagination {
                current: number == state.cur_page,
                number,
                link: state.link(state.tag, number),
            })
            .collect();

        self.template.render(&ListPage {
            site_title: self.site_title,
            site_description: self.site_description,
            current_tag: state.tag,
            showing_drafts: state.show_drafts,
            post_list,
            tags,
            page_list,
            show_pagination: state.page_count > 1,
        })
    }
}
