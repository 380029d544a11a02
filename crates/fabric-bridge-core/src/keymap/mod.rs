//! Scancode to keyboard-matrix translation table.
//!
//! Every tracked scancode slot (0–63) holds an optional [`MappingRule`].  The
//! table reproduces the target keyboard's own shifted-symbol layout rather
//! than the host's: on the target, `"` lives on shift+2 and `(` on shift+8,
//! so host symbols are remapped onto whichever target key produces them.
//!
//! # How this table works
//!
//! `MAPPING_TABLE` is a compile-time array indexed by scancode slot.  Lookup is
//! a single index, and a slot without an entry means "no matrix effect".

pub mod matrix_key;
pub mod scancode;

pub use matrix_key::MatrixKey;
pub use scancode::{Scancode, TRACKED_SCANCODES};

/// A target key together with the state of the target's own shift plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub key: MatrixKey,
    /// `true` asserts the matrix SHIFT key, `false` releases it.
    pub shift: bool,
}

impl Target {
    pub const fn new(key: MatrixKey, shift: bool) -> Self {
        Self { key, shift }
    }
}

/// How a pressed scancode is expressed on the target matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingRule {
    /// One target key; the live shift state passes through unchanged.
    Direct(MatrixKey),
    /// The target key depends on the live shift state.  `None` means the
    /// scancode has no effect in that plane.
    ShiftRemap {
        unshifted: Option<Target>,
        shifted: Option<Target>,
    },
    /// Two target keys held together; the shift plane is left untouched.
    /// Suppressed while ctrl is held.
    Composite {
        primary: MatrixKey,
        secondary: MatrixKey,
    },
}

/// Looks up the mapping rule for a scancode.
///
/// Returns `None` for modifiers, unknown scancodes, and tracked scancodes
/// without a target equivalent.
pub fn rule_for(scancode: Scancode) -> Option<MappingRule> {
    scancode.slot().and_then(rule_for_slot)
}

/// Looks up the mapping rule for a pressed-key slot.
pub fn rule_for_slot(slot: usize) -> Option<MappingRule> {
    MAPPING_TABLE.get(slot).copied().flatten()
}

const fn remap(unshifted: Target, shifted: Target) -> Option<MappingRule> {
    Some(MappingRule::ShiftRemap {
        unshifted: Some(unshifted),
        shifted: Some(shifted),
    })
}

const fn direct(key: MatrixKey) -> Option<MappingRule> {
    Some(MappingRule::Direct(key))
}

/// Scancode slot → rule.
const MAPPING_TABLE: [Option<MappingRule>; TRACKED_SCANCODES] = {
    use MatrixKey as K;
    let mut t: [Option<MappingRule>; TRACKED_SCANCODES] = [None; TRACKED_SCANCODES];

    // ── Letters ───────────────────────────────────────────────────────────────
    t[Scancode::KeyA as usize] = direct(K::A);
    t[Scancode::KeyB as usize] = direct(K::B);
    t[Scancode::KeyC as usize] = direct(K::C);
    t[Scancode::KeyD as usize] = direct(K::D);
    t[Scancode::KeyE as usize] = direct(K::E);
    t[Scancode::KeyF as usize] = direct(K::F);
    t[Scancode::KeyG as usize] = direct(K::G);
    t[Scancode::KeyH as usize] = direct(K::H);
    t[Scancode::KeyI as usize] = direct(K::I);
    t[Scancode::KeyJ as usize] = direct(K::J);
    t[Scancode::KeyK as usize] = direct(K::K);
    t[Scancode::KeyL as usize] = direct(K::L);
    t[Scancode::KeyM as usize] = direct(K::M);
    t[Scancode::KeyN as usize] = direct(K::N);
    t[Scancode::KeyO as usize] = direct(K::O);
    t[Scancode::KeyP as usize] = direct(K::P);
    t[Scancode::KeyQ as usize] = direct(K::Q);
    t[Scancode::KeyR as usize] = direct(K::R);
    t[Scancode::KeyS as usize] = direct(K::S);
    t[Scancode::KeyT as usize] = direct(K::T);
    t[Scancode::KeyU as usize] = direct(K::U);
    t[Scancode::KeyV as usize] = direct(K::V);
    t[Scancode::KeyW as usize] = direct(K::W);
    t[Scancode::KeyX as usize] = direct(K::X);
    t[Scancode::KeyY as usize] = direct(K::Y);
    t[Scancode::KeyZ as usize] = direct(K::Z);

    // ── Digit row ─────────────────────────────────────────────────────────────
    t[Scancode::Digit1 as usize] = direct(K::Digit1);
    // The target has " on shift+2 and @ on shift+;.
    t[Scancode::Digit2 as usize] = remap(Target::new(K::Digit2, false), Target::new(K::Semicolon, true));
    t[Scancode::Digit3 as usize] = direct(K::Digit3);
    t[Scancode::Digit4 as usize] = direct(K::Digit4);
    t[Scancode::Digit5 as usize] = direct(K::Digit5);
    t[Scancode::Digit6 as usize] = remap(Target::new(K::Digit6, false), Target::new(K::Slash, true));
    t[Scancode::Digit7 as usize] = remap(Target::new(K::Digit7, false), Target::new(K::Digit6, true));
    t[Scancode::Digit8 as usize] = remap(Target::new(K::Digit8, false), Target::new(K::Colon, true));
    t[Scancode::Digit9 as usize] = remap(Target::new(K::Digit9, false), Target::new(K::Digit8, true));
    t[Scancode::Digit0 as usize] = remap(Target::new(K::Digit0, false), Target::new(K::Digit9, true));
    t[Scancode::Minus as usize] = direct(K::Minus);
    t[Scancode::Equal as usize] = direct(K::Equals);
    t[Scancode::Backspace as usize] = remap(
        Target::new(K::Backspace, false),
        Target::new(K::Backspace, false),
    );

    // ── Punctuation ───────────────────────────────────────────────────────────
    t[Scancode::Semicolon as usize] = remap(Target::new(K::Semicolon, false), Target::new(K::Colon, false));
    t[Scancode::Quote as usize] = remap(Target::new(K::Digit7, true), Target::new(K::Digit2, true));
    t[Scancode::Backslash as usize] = Some(MappingRule::ShiftRemap {
        unshifted: Some(Target::new(K::Backspace, true)),
        shifted: None,
    });
    t[Scancode::Comma as usize] = direct(K::Comma);
    t[Scancode::Period as usize] = direct(K::Period);
    t[Scancode::Slash as usize] = remap(Target::new(K::Slash, false), Target::new(K::Digit0, true));

    // ── Control keys ──────────────────────────────────────────────────────────
    t[Scancode::Enter as usize] = direct(K::Return);
    t[Scancode::Space as usize] = direct(K::Space);
    // Escape emulates the target's CTRL+C break sequence.
    t[Scancode::Escape as usize] = Some(MappingRule::Composite {
        primary: K::Ctrl,
        secondary: K::C,
    });

    t
};
