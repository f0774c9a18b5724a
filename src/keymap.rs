//! Key-dispatch registry and static conflict detection.
//!
//! The driver consults a [`KeyRegistry`] before falling back to
//! [`Page::handle_key`](crate::page::Page::handle_key). Bindings come in
//! layers; the most recently pushed layer wins.

use crate::input::KeyToken;
use crate::page::{Action, KeyBinding, Page};
use std::collections::BTreeMap;

/// Keys the driver handles itself outside any modal.
pub const RESERVED_KEYS: [&str; 3] = ["?", "Esc", "C-c"];

/// Identifies one pushed layer of bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingHandle(u64);

/// A layered set of key bindings.
pub trait KeyRegistry<S> {
    /// Add a layer on top.
    fn push(&mut self, bindings: Vec<KeyBinding<S>>) -> BindingHandle;

    /// Remove the layer `handle` refers to. Unknown handles are ignored.
    fn pop(&mut self, handle: BindingHandle);

    /// The action bound to `key`, searching from the top layer down.
    /// `None` means the key was not consumed.
    fn dispatch(&self, key: &KeyToken) -> Option<Action<S>>;

    /// `(key, help)` pairs of the top layer.
    fn top_bindings(&self) -> Vec<(String, String)>;

    /// `(key, help)` pairs of every layer, top first, one per key.
    fn all_bindings(&self) -> Vec<(String, String)>;
}

/// Default [`KeyRegistry`]: a plain stack of layers.
pub struct BindingStack<S> {
    layers: Vec<(BindingHandle, Vec<KeyBinding<S>>)>,
    next_id: u64,
}

impl<S> BindingStack<S> {
    /// An empty registry.
    pub const fn new() -> Self {
        Self {
            layers: Vec::new(),
            next_id: 0,
        }
    }

    /// Number of layers.
    pub fn depth(&self) -> usize {
        self.layers.len()
    }
}

impl<S> Default for BindingStack<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> std::fmt::Debug for BindingStack<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingStack")
            .field("layers", &self.layers)
            .finish_non_exhaustive()
    }
}

fn pairs<'a, S: 'a>(bindings: impl IntoIterator<Item = &'a KeyBinding<S>>) -> Vec<(String, String)> {
    bindings
        .into_iter()
        .map(|b| (b.key.clone(), b.help.clone()))
        .collect()
}

impl<S> KeyRegistry<S> for BindingStack<S> {
    fn push(&mut self, bindings: Vec<KeyBinding<S>>) -> BindingHandle {
        let handle = BindingHandle(self.next_id);
        self.next_id += 1;
        self.layers.push((handle, bindings));
        handle
    }

    fn pop(&mut self, handle: BindingHandle) {
        self.layers.retain(|(h, _)| *h != handle);
    }

    fn dispatch(&self, key: &KeyToken) -> Option<Action<S>> {
        self.layers
            .iter()
            .rev()
            .flat_map(|(_, bindings)| bindings)
            .find(|b| b.dispatches(key))
            .and_then(|b| b.action.clone())
    }

    fn top_bindings(&self) -> Vec<(String, String)> {
        self.layers
            .last()
            .map(|(_, bindings)| pairs(bindings))
            .unwrap_or_default()
    }

    fn all_bindings(&self) -> Vec<(String, String)> {
        let mut seen = std::collections::HashSet::new();
        pairs(
            self.layers
                .iter()
                .rev()
                .flat_map(|(_, bindings)| bindings)
                .filter(|b| seen.insert(b.key.clone())),
        )
    }
}

/// A key claimed by more than one owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyConflict {
    /// The contested key.
    pub key: String,
    /// Every owner claiming it, in the order given.
    pub owners: Vec<String>,
}

/// Find keys claimed by more than one owner.
///
/// Each entry is an owner name (a page, a global layer, `"driver"`) and
/// the keys it handles. Results are sorted by key.
pub fn conflicts<'a, I, K>(owners: I) -> Vec<KeyConflict>
where
    I: IntoIterator<Item = (&'a str, K)>,
    K: IntoIterator,
    K::Item: AsRef<str>,
{
    let mut claims: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (owner, keys) in owners {
        for key in keys {
            let claimants = claims.entry(key.as_ref().to_string()).or_default();
            if !claimants.iter().any(|o| o == owner) {
                claimants.push(owner.to_string());
            }
        }
    }
    claims
        .into_iter()
        .filter(|(_, owners)| owners.len() > 1)
        .map(|(key, owners)| KeyConflict { key, owners })
        .collect()
}

/// Keys `page` handles that the driver reserves for itself.
pub fn reserved_conflicts<P: Page>(name: &str, page: &P) -> Vec<KeyConflict> {
    conflicts([("driver", RESERVED_KEYS.map(String::from).to_vec()), (name, page.handled_keys())])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::{Navigation, Pending};

    fn run(action: &Action<()>) -> Pending {
        let mut modals = crate::modal::ModalStack::new();
        let tasks = crate::actor::TaskScope::new(crate::actor::Notifier::new());
        let mut cx = crate::page::PageCx::new(crate::terminal::Size::DEFAULT, &mut modals, &tasks);
        action(Navigation::make(()), &mut cx).pending().clone()
    }

    #[test]
    fn test_top_layer_wins() {
        let mut registry = BindingStack::new();
        registry.push(vec![KeyBinding::new("g", "logs", |nav: Navigation<()>, _| nav.goto("logs"))]);
        let top = registry.push(vec![KeyBinding::new("g", "back", |nav: Navigation<()>, _| nav.back())]);

        let action = registry.dispatch(&KeyToken::char("g"));
        assert_eq!(action.as_ref().map(run), Some(Pending::Back));

        registry.pop(top);
        let action = registry.dispatch(&KeyToken::char("g"));
        assert_eq!(action.as_ref().map(run), Some(Pending::Goto("logs".to_string())));
    }

    #[test]
    fn test_display_only_is_not_consumed() {
        let mut registry: BindingStack<()> = BindingStack::new();
        registry.push(vec![KeyBinding::display("j", "down")]);
        assert!(registry.dispatch(&KeyToken::char("j")).is_none());
        assert!(registry.dispatch(&KeyToken::char("k")).is_none());
        assert_eq!(registry.top_bindings(), [("j".to_string(), "down".to_string())]);
    }

    #[test]
    fn test_all_bindings_dedupes_top_first() {
        let mut registry: BindingStack<()> = BindingStack::new();
        registry.push(vec![KeyBinding::display("q", "quit"), KeyBinding::display("j", "down")]);
        registry.push(vec![KeyBinding::display("q", "close")]);
        let all = registry.all_bindings();
        assert_eq!(
            all,
            [
                ("q".to_string(), "close".to_string()),
                ("j".to_string(), "down".to_string())
            ]
        );
    }

    #[test]
    fn test_pop_unknown_handle_is_ignored() {
        let mut registry: BindingStack<()> = BindingStack::new();
        let handle = registry.push(Vec::new());
        registry.pop(handle);
        registry.pop(handle);
        assert_eq!(registry.depth(), 0);
        assert!(registry.top_bindings().is_empty());
    }

    #[test]
    fn test_conflicts() {
        let found = conflicts([
            ("driver", vec!["?", "Esc"]),
            ("logs", vec!["j", "?"]),
            ("files", vec!["j", "d"]),
        ]);
        assert_eq!(
            found,
            [
                KeyConflict {
                    key: "?".to_string(),
                    owners: vec!["driver".to_string(), "logs".to_string()],
                },
                KeyConflict {
                    key: "j".to_string(),
                    owners: vec!["logs".to_string(), "files".to_string()],
                },
            ]
        );
    }

    #[test]
    fn test_same_owner_twice_is_not_a_conflict() {
        assert!(conflicts([("logs", vec!["j", "j"])]).is_empty());
    }
}
