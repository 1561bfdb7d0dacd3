//! Block-scoped state of the rewrite pass.
//!
//! A rule block may hold a `background` shorthand naming a sprite followed by a
//! `background-position` longhand. The group keeps the shorthand open until the block
//! ends so the longhand can be folded into it and a single declaration is emitted.

use crate::css::{CssEvent, Declaration};
use crate::position::BackgroundPosition;
use crate::sprite::SpriteRef;

/// An event held back while a background is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pending {
    Event(CssEvent),
    /// A `background-position` folded into the open background. Dropped when the
    /// background is rewritten, printed unchanged otherwise.
    Merged(Declaration),
}

/// The open background declaration of the current block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveBackground {
    /// The declaration as it appeared in the source.
    pub declaration: Declaration,
    /// The sprite, with merged longhand positions folded into `declared_position`.
    pub sprite: SpriteRef,
    /// Events that followed the declaration inside the block, in order.
    pub pending: Vec<Pending>,
    /// Set when a merge met a non-pixel position; such a background is never rewritten.
    pub unsupported: Option<String>,
}

impl ActiveBackground {
    fn new(declaration: Declaration, sprite: SpriteRef) -> Self {
        Self {
            declaration,
            sprite,
            pending: Vec::new(),
            unsupported: None,
        }
    }

    /// Events to emit for this background. With `replacement` the declaration text is
    /// replaced and merged longhands are dropped together with the whitespace that
    /// led up to them; without it everything is emitted as it was read.
    pub fn into_events(self, replacement: Option<String>) -> Vec<CssEvent> {
        let mut out = Vec::with_capacity(self.pending.len() + 1);
        let rewritten = replacement.is_some();
        let mut declaration = self.declaration;
        if let Some(text) = replacement {
            declaration.text = text;
        }
        out.push(CssEvent::Declaration(declaration));
        for p in self.pending {
            match p {
                Pending::Event(ev) => out.push(ev),
                Pending::Merged(_) if rewritten => {
                    if matches!(out.last(), Some(CssEvent::Other(s)) if s.trim().is_empty()) {
                        out.pop();
                    }
                }
                Pending::Merged(d) => out.push(CssEvent::Declaration(d)),
            }
        }
        out
    }
}

/// Result of offering a `background-position` declaration to the group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Folded into the open background.
    Merged,
    /// Kept as an ordinary declaration inside the open group; the background is now
    /// marked unsupported.
    Unsupported(String),
    /// No open background: the declaration goes out unchanged.
    PassThrough(Declaration),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum GroupState {
    #[default]
    Idle,
    Active(ActiveBackground),
}

#[derive(Debug, Clone, Default)]
pub struct DeclarationGroup {
    state: GroupState,
}

impl DeclarationGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, GroupState::Active(_))
    }

    pub fn active(&self) -> Option<&ActiveBackground> {
        match &self.state {
            GroupState::Active(a) => Some(a),
            GroupState::Idle => None,
        }
    }

    /// Opens `declaration` as the block's background. A background that was already
    /// open is returned so the caller can flush it first.
    pub fn open(&mut self, declaration: Declaration, sprite: SpriteRef) -> Option<ActiveBackground> {
        let previous = self.close();
        self.state = GroupState::Active(ActiveBackground::new(declaration, sprite));
        previous
    }

    /// Holds `event` back while a background is open; hands it back otherwise.
    pub fn defer(&mut self, event: CssEvent) -> Option<CssEvent> {
        match &mut self.state {
            GroupState::Active(a) => {
                a.pending.push(Pending::Event(event));
                None
            }
            GroupState::Idle => Some(event),
        }
    }

    /// Folds a `background-position` declaration into the open background:
    /// the new declared position is `old - new`, componentwise, pixels only.
    pub fn merge_position(&mut self, declaration: Declaration) -> MergeOutcome {
        let GroupState::Active(active) = &mut self.state else {
            return MergeOutcome::PassThrough(declaration);
        };
        if let Some(reason) = &active.unsupported {
            let reason = reason.clone();
            active.pending.push(Pending::Event(CssEvent::Declaration(declaration)));
            return MergeOutcome::Unsupported(reason);
        }
        let value = declaration.split().map(|(_, v)| v.to_string()).unwrap_or_default();
        let new_pos = BackgroundPosition::parse(&value, true);
        match active.sprite.declared_position.subtract(&new_pos) {
            Ok(delta) => {
                active.sprite = active.sprite.with_position(delta);
                active.pending.push(Pending::Merged(declaration));
                MergeOutcome::Merged
            }
            Err(e) => {
                let reason = e.to_string();
                active.unsupported = Some(reason.clone());
                active.pending.push(Pending::Event(CssEvent::Declaration(declaration)));
                MergeOutcome::Unsupported(reason)
            }
        }
    }

    /// Ends the block: returns the open background, if any, and resets to idle.
    pub fn close(&mut self) -> Option<ActiveBackground> {
        match std::mem::take(&mut self.state) {
            GroupState::Active(a) => Some(a),
            GroupState::Idle => None,
        }
    }
}
