//! Control-flow context for function bodies
//!
//! One `Function` frame per function being checked and one `Loop` frame per
//! `loop`/`while`. Each frame carries the type unified across its `return`s
//! or `break`s.

use crate::types::TypeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Function,
    Loop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockFrame {
    pub kind: BlockKind,
    /// First `return`/`break` type seen in this frame
    pub ret: Option<TypeId>,
}

#[derive(Debug, Default)]
pub struct BlockCtx {
    frames: Vec<BlockFrame>,
}

impl BlockCtx {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&mut self, kind: BlockKind) {
        self.frames.push(BlockFrame { kind, ret: None });
    }

    pub fn exit(&mut self) -> Option<BlockFrame> {
        self.frames.pop()
    }

    /// Innermost frame of `kind`
    pub fn last_mut(&mut self, kind: BlockKind) -> Option<&mut BlockFrame> {
        self.frames.iter_mut().rev().find(|f| f.kind == kind)
    }

    pub fn in_scope(&self, kind: BlockKind) -> bool {
        self.frames.iter().any(|f| f.kind == kind)
    }

    /// Innermost loop frame, not looking past the enclosing function
    pub fn innermost_loop(&mut self) -> Option<&mut BlockFrame> {
        match self.frames.last_mut() {
            Some(frame) if frame.kind == BlockKind::Loop => Some(frame),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loop_frames_stack() {
        let mut ctx = BlockCtx::new();
        ctx.enter(BlockKind::Function);
        assert!(ctx.innermost_loop().is_none());
        ctx.enter(BlockKind::Loop);
        ctx.innermost_loop().unwrap().ret = Some(TypeId::I32);
        ctx.enter(BlockKind::Loop);
        assert_eq!(ctx.innermost_loop().unwrap().ret, None);
        ctx.exit();
        assert_eq!(ctx.exit().unwrap().ret, Some(TypeId::I32));
        assert!(ctx.in_scope(BlockKind::Function));
        assert!(!ctx.in_scope(BlockKind::Loop));
        ctx.last_mut(BlockKind::Function).unwrap().ret = Some(TypeId::VOID);
        assert_eq!(ctx.exit().unwrap().ret, Some(TypeId::VOID));
        assert!(ctx.is_empty());
    }
}
