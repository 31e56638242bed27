use std::collections::HashMap;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Target {
    pub url: String,
    pub title: String,
}

/// Case-insensitive reference-link table. The first definition of an id
/// wins; later definitions of the same id are ignored.
#[derive(Clone, Debug, Default)]
pub struct LinkIds {
    table: HashMap<String, Target>,
}

impl LinkIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, id: &str) -> Option<&Target> {
        self.table.get(&scrub_key(id))
    }

    pub fn add(&mut self, id: &str, url: &str, title: &str) {
        self.table.entry(scrub_key(id)).or_insert_with(|| Target {
            url: url.to_string(),
            title: title.to_string(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

fn scrub_key(id: &str) -> String {
    id.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_are_case_insensitive() {
        let mut ids = LinkIds::new();
        ids.add("Foo", "http://example.com", "t");
        assert_eq!(ids.find("foo").map(|t| t.url.as_str()), Some("http://example.com"));
        assert_eq!(ids.find("FOO").map(|t| t.title.as_str()), Some("t"));
        assert!(ids.find("bar").is_none());
    }

    #[test]
    fn first_definition_wins() {
        let mut ids = LinkIds::new();
        ids.add("id", "http://first.example", "");
        ids.add("ID", "http://second.example", "");
        assert_eq!(
            ids.find("id").map(|t| t.url.as_str()),
            Some("http://first.example")
        );
    }
}
