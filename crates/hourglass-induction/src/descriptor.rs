//! Immutable induction descriptors.
//!
//! A [`Descriptor`] says how an induction is timed and which slot it
//! occupies: an iteration-period supplier (zero means the action layer
//! completes it manually) and a set of [`InductionFlags`]. Descriptors are
//! built once per kind of action and shared between instances.

use core::fmt;
use core::ops::BitOr;
use std::sync::Arc;

/// Flag set of a descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct InductionFlags(u8);

impl InductionFlags {
    /// No flags: a one-shot active induction.
    pub const NONE: Self = Self(0);
    /// The action layer shows a progress indicator while it runs.
    pub const SPINNER: Self = Self(0b001);
    /// Re-arms after every successful completion.
    pub const REPEATING: Self = Self(0b010);
    /// Occupies the primary (involuntary) slot instead of the active one.
    pub const PRIMARY: Self = Self(0b100);

    /// Whether every flag in `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Union of two flag sets.
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Raw bit pattern.
    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for InductionFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// Which of an actor's two slots an induction occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// The voluntary slot: at most one per actor.
    Active,
    /// The involuntary slot: at most one per actor, coexists with active.
    Primary,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("active"),
            Self::Primary => f.write_str("primary"),
        }
    }
}

/// Supplies the iteration period each time an induction starts.
#[derive(Clone)]
enum PeriodSource {
    /// The same period every time.
    Fixed(u64),
    /// Computed at start, e.g. from the actor's skill.
    Computed(Arc<dyn Fn() -> u64 + Send + Sync>),
}

/// How an induction is timed and which slot it occupies.
#[derive(Clone)]
pub struct Descriptor {
    /// Iteration period supplier.
    period: PeriodSource,
    /// Flag set.
    flags: InductionFlags,
}

impl Descriptor {
    /// Start building a descriptor. Defaults to period zero, no flags.
    pub fn builder() -> DescriptorBuilder {
        DescriptorBuilder {
            period: PeriodSource::Fixed(0),
            flags: InductionFlags::NONE,
        }
    }

    /// Iteration period in game minutes. Zero means no callback is
    /// scheduled and the action layer completes the induction itself.
    pub fn period(&self) -> u64 {
        match &self.period {
            PeriodSource::Fixed(period) => *period,
            PeriodSource::Computed(supplier) => supplier(),
        }
    }

    /// The descriptor's flags.
    pub const fn flags(&self) -> InductionFlags {
        self.flags
    }

    /// The slot this induction occupies.
    pub const fn slot(&self) -> Slot {
        if self.flags.contains(InductionFlags::PRIMARY) {
            Slot::Primary
        } else {
            Slot::Active
        }
    }

    /// Whether the induction re-arms after each successful completion.
    pub const fn is_repeating(&self) -> bool {
        self.flags.contains(InductionFlags::REPEATING)
    }

    /// Whether the induction occupies the primary slot.
    pub const fn is_primary(&self) -> bool {
        self.flags.contains(InductionFlags::PRIMARY)
    }

    /// Whether the action layer should show a progress indicator.
    pub const fn shows_spinner(&self) -> bool {
        self.flags.contains(InductionFlags::SPINNER)
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let period = match &self.period {
            PeriodSource::Fixed(period) => Some(*period),
            PeriodSource::Computed(_) => None,
        };
        f.debug_struct("Descriptor")
            .field("period", &period)
            .field("flags", &self.flags)
            .finish()
    }
}

/// Builder for [`Descriptor`].
pub struct DescriptorBuilder {
    /// Iteration period supplier.
    period: PeriodSource,
    /// Flags accumulated so far.
    flags: InductionFlags,
}

impl DescriptorBuilder {
    /// Use a fixed iteration period.
    #[must_use]
    pub fn period(mut self, minutes: u64) -> Self {
        self.period = PeriodSource::Fixed(minutes);
        self
    }

    /// Compute the iteration period each time an instance starts.
    #[must_use]
    pub fn period_with<F>(mut self, supplier: F) -> Self
    where
        F: Fn() -> u64 + Send + Sync + 'static,
    {
        self.period = PeriodSource::Computed(Arc::new(supplier));
        self
    }

    /// Add flags.
    #[must_use]
    pub const fn flags(mut self, flags: InductionFlags) -> Self {
        self.flags = self.flags.union(flags);
        self
    }

    /// Re-arm after every successful completion.
    #[must_use]
    pub const fn repeating(self) -> Self {
        self.flags(InductionFlags::REPEATING)
    }

    /// Occupy the primary slot.
    #[must_use]
    pub const fn primary(self) -> Self {
        self.flags(InductionFlags::PRIMARY)
    }

    /// Ask the action layer to show a progress indicator.
    #[must_use]
    pub const fn spinner(self) -> Self {
        self.flags(InductionFlags::SPINNER)
    }

    /// Finish building.
    pub fn build(self) -> Arc<Descriptor> {
        Arc::new(Descriptor {
            period: self.period,
            flags: self.flags,
        })
    }
}
