//! Binding lifecycle flags.

bitflags::bitflags! {
    /// Lifecycle flags for a binding.
    ///
    /// - **SHARED**: the produced value is memoized and reused by every resolution
    /// - **PROTECTED**: the binding's factory cannot be replaced once set
    ///
    /// Bit 0 is `SHARED`, so the raw value `1` passed through the definition
    /// helpers means "shared".
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ferrous_construct::{BindFlags, Container, Factory};
    ///
    /// let container = Container::new();
    /// container.bind("config", Factory::value(8080u16), BindFlags::SHARED | BindFlags::PROTECTED);
    ///
    /// // Protected: later overrides are ignored and reported as such
    /// assert!(!container.bind("config", Factory::value(0u16), BindFlags::empty()));
    /// assert_eq!(*container.get_as::<u16>("config").unwrap(), 8080);
    /// assert_eq!(BindFlags::from_bits_truncate(1), BindFlags::SHARED);
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BindFlags: u32 {
        /// Memoize the produced value
        const SHARED = 1 << 0;
        /// Reject later factory replacement
        const PROTECTED = 1 << 1;
    }
}

impl BindFlags {
    /// Builds flags from the two booleans used throughout the binding API.
    pub fn from_parts(shared: bool, protected: bool) -> Self {
        let mut flags = BindFlags::empty();
        flags.set(BindFlags::SHARED, shared);
        flags.set(BindFlags::PROTECTED, protected);
        flags
    }

    pub fn is_shared(self) -> bool {
        self.contains(BindFlags::SHARED)
    }

    pub fn is_protected(self) -> bool {
        self.contains(BindFlags::PROTECTED)
    }
}
