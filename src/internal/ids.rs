macro_rules! impl_id {
    ($name:ident, $tp:ty) => {
        /// The ID type $name.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub(crate) struct $name($tp);

        impl $name {
            /// Create a new id.
            #[inline]
            pub(crate) const fn new(index: $tp) -> Self {
                $name(index)
            }

            /// Get the id as usize.
            #[allow(dead_code)]
            #[inline]
            pub(crate) fn as_usize(&self) -> usize {
                self.0 as usize
            }

            /// Get the id as $tp.
            #[allow(dead_code)]
            #[inline]
            pub(crate) fn id(&self) -> $tp {
                self.0
            }
        }

        impl<T> std::ops::Index<$name> for [T] {
            type Output = T;

            #[inline]
            fn index(&self, index: $name) -> &Self::Output {
                &self[index.0 as usize]
            }
        }

        impl<T> std::ops::Index<$name> for Vec<T> {
            type Output = T;

            #[inline]
            fn index(&self, index: $name) -> &Self::Output {
                &self[index.0 as usize]
            }
        }

        impl<T> std::ops::IndexMut<$name> for Vec<T> {
            #[inline]
            fn index_mut(&mut self, index: $name) -> &mut T {
                &mut self[index.0 as usize]
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$tp> for $name {
            fn from(index: $tp) -> Self {
                $name::new(index)
            }
        }
    };
}

/// The ID type for branches of a rule tree. This is the index of the branch in the branch arena
/// of the [super::RuleTree].
pub(crate) type BranchIDBase = u32;
impl_id!(BranchID, BranchIDBase);

/// The ID type for rules. This is the index of the rule in the rule vector the tokenizer was built
/// from. It determines the priority of the rule, i.e. lower indices win on identical prefixes.
pub(crate) type RuleIDBase = u32;
impl_id!(RuleID, RuleIDBase);

/// The ID type for stages. This is the index of the stage in the list of known stages.
pub(crate) type StageIDBase = u32;
impl_id!(StageID, StageIDBase);

/// The ID type for variables of the code IR. IDs are unique per [super::Assembler].
pub(crate) type VarIDBase = u32;
impl_id!(VarID, VarIDBase);
