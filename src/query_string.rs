use std::collections::HashMap;

/// Query parameters of the post list page.
#[derive(PartialEq, Debug, Default)]
pub struct QueryString {
    items: HashMap<String, String>,
}

impl QueryString {
    pub fn from(buf: &str) -> Self {
        let vs: Vec<(String, String)> = serde_urlencoded::from_str(buf).unwrap_or_default();

        QueryString {
            items: vs.into_iter().collect(),
        }
    }

    pub fn get_page(&self) -> u32 {
        self.items.get("page")
            .and_then(|val| val.parse().ok())
            .filter(|val| *val > 0)
            .unwrap_or(1)
    }

    pub fn get_tag(&self) -> Option<&str> {
        self.items.get("tag")
            .map(|tag| tag.as_str())
            .filter(|tag| !tag.is_empty())
    }

    pub fn show_drafts(&self) -> bool {
        self.items.get("show_drafts").is_some_and(|val| val == "true")
    }
}
