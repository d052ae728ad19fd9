//! Local renaming scopes
//!
//! Every block of a function body gets a frame with a fresh id. Local
//! bindings are renamed to `_name_id` so that names stay unique once nested
//! declarations share one flat namespace; a second binding of the same name
//! in the same frame is renamed again on top of the first mangled name.

use rustc_hash::FxHashMap;

#[derive(Debug)]
struct Frame {
    id: usize,
    names: FxHashMap<String, String>,
}

/// Stack of renaming frames
#[derive(Debug, Default)]
pub struct LocalScope {
    frames: Vec<Frame>,
    next_id: usize,
}

impl LocalScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a frame with a fresh id
    pub fn enter_scope(&mut self) -> usize {
        self.next_id += 1;
        let id = self.next_id;
        self.frames.push(Frame {
            id,
            names: FxHashMap::default(),
        });
        id
    }

    pub fn exit_scope(&mut self) {
        self.frames.pop();
    }

    /// Whether any frame is active, i.e. we are inside a function body
    pub fn is_active(&self) -> bool {
        !self.frames.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    fn gen_new_name(name: &str, id: usize) -> String {
        format!("_{}_{}", name, id)
    }

    /// Bind `name` in the innermost frame and return its mangled name.
    /// Outside any frame the name is returned unchanged.
    pub fn create_local(&mut self, name: &str) -> String {
        let Some(frame) = self.frames.last_mut() else {
            return name.to_string();
        };
        let mangled = match frame.names.get(name) {
            Some(previous) => Self::gen_new_name(previous, frame.id),
            None => Self::gen_new_name(name, frame.id),
        };
        frame.names.insert(name.to_string(), mangled.clone());
        log::trace!("renamed local `{}` to `{}`", name, mangled);
        mangled
    }

    /// Number of active frames that bind `name`
    pub fn count(&self, name: &str) -> usize {
        self.frames
            .iter()
            .filter(|f| f.names.contains_key(name))
            .count()
    }

    /// Innermost mangled name for `name`
    pub fn get_new_name(&self, name: &str) -> Option<&str> {
        self.frames
            .iter()
            .rev()
            .find_map(|f| f.names.get(name))
            .map(String::as_str)
    }
}
