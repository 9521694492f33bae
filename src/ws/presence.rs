use std::collections::BTreeMap;

/// Live connection count per username.
///
/// A username is listed iff its count is positive.
#[derive(Debug, Default, Clone)]
pub struct Presence {
    counts: BTreeMap<String, usize>,
}

impl Presence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&mut self, username: &str) {
        *self.counts.entry(username.to_string()).or_insert(0) += 1;
    }

    /// Returns true when this was the user's last connection.
    pub fn leave(&mut self, username: &str) -> bool {
        match self.counts.get_mut(username) {
            Some(count) if *count > 1 => {
                *count -= 1;
                false
            }
            Some(_) => {
                self.counts.remove(username);
                true
            }
            None => false,
        }
    }

    /// Sorted, de-duplicated roster
    pub fn users(&self) -> Vec<String> {
        self.counts.keys().cloned().collect()
    }
}
