use std::fmt;

use serde::{Deserialize, Serialize};

/// Declaration modifiers, in source keyword form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Public,
    Protected,
    Private,
    Static,
    Final,
    Abstract,
    Native,
    Synchronized,
    Transient,
    Volatile,
    Strictfp,
    Default,
    Sealed,
    NonSealed,
}

impl Modifier {
    const ALL: [Modifier; 14] = [
        Modifier::Public,
        Modifier::Protected,
        Modifier::Private,
        Modifier::Static,
        Modifier::Final,
        Modifier::Abstract,
        Modifier::Native,
        Modifier::Synchronized,
        Modifier::Transient,
        Modifier::Volatile,
        Modifier::Strictfp,
        Modifier::Default,
        Modifier::Sealed,
        Modifier::NonSealed,
    ];

    const fn bit(self) -> u16 {
        1 << (self as u16)
    }

    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Modifier::Public => "public",
            Modifier::Protected => "protected",
            Modifier::Private => "private",
            Modifier::Static => "static",
            Modifier::Final => "final",
            Modifier::Abstract => "abstract",
            Modifier::Native => "native",
            Modifier::Synchronized => "synchronized",
            Modifier::Transient => "transient",
            Modifier::Volatile => "volatile",
            Modifier::Strictfp => "strictfp",
            Modifier::Default => "default",
            Modifier::Sealed => "sealed",
            Modifier::NonSealed => "non-sealed",
        }
    }
}

/// A compact modifier set, stored in stubs as a plain bitmask.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub struct ModifierMask(u16);

impl ModifierMask {
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    #[must_use]
    pub fn of(modifiers: &[Modifier]) -> Self {
        let mut mask = Self::empty();
        for &m in modifiers {
            mask.insert(m);
        }
        mask
    }

    pub fn insert(&mut self, modifier: Modifier) {
        self.0 |= modifier.bit();
    }

    pub fn remove(&mut self, modifier: Modifier) {
        self.0 &= !modifier.bit();
    }

    #[must_use]
    pub const fn contains(&self, modifier: Modifier) -> bool {
        self.0 & modifier.bit() != 0
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Visibility helper: no explicit access modifier present.
    #[must_use]
    pub fn is_package_private(&self) -> bool {
        !self.contains(Modifier::Public)
            && !self.contains(Modifier::Protected)
            && !self.contains(Modifier::Private)
    }

    pub fn iter(&self) -> impl Iterator<Item = Modifier> + '_ {
        Modifier::ALL.iter().copied().filter(|m| self.contains(*m))
    }
}

impl fmt::Display for ModifierMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for m in self.iter() {
            if !first {
                f.write_str(" ")?;
            }
            f.write_str(m.keyword())?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_round_trips_members() {
        let mask = ModifierMask::of(&[Modifier::Public, Modifier::Static, Modifier::Final]);
        assert!(mask.contains(Modifier::Public));
        assert!(mask.contains(Modifier::Static));
        assert!(!mask.contains(Modifier::Private));
        assert_eq!(mask.iter().count(), 3);
        assert_eq!(mask.to_string(), "public static final");
    }

    #[test]
    fn package_private_means_no_access_modifier() {
        assert!(ModifierMask::of(&[Modifier::Static]).is_package_private());
        assert!(!ModifierMask::of(&[Modifier::Protected]).is_package_private());
    }
}
