//! Effect flags - what a fiber needs done to the host tree at commit.

bitflags::bitflags! {
    /// Commit-time work recorded on a fiber.
    ///
    /// `subtree_flags` on a fiber is the OR of every descendant's flags, so a
    /// subtree without mutations can be recognised without walking it.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Flags: u16 {
        const NONE = 0;
        /// Host node must be inserted under its host parent.
        const PLACEMENT = 1 << 0;
        /// Host node properties (or text) changed.
        const UPDATE = 1 << 1;
        /// One or more children sit in this fiber's `deletions`.
        const CHILD_DELETION = 1 << 2;
        /// Set on the outgoing fiber of a deleted position.
        const DELETION = 1 << 3;
        /// Ref must be attached.
        const REF = 1 << 4;

        const MUTATION_MASK = Self::PLACEMENT.bits()
            | Self::UPDATE.bits()
            | Self::CHILD_DELETION.bits()
            | Self::REF.bits();
    }
}
