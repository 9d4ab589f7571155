//! External reference data.
//!
//! The pipeline only needs a `code -> name` mapping for US states. It is
//! obtained through [`StateNameResolver`] so the network fetch can be swapped
//! for the built-in table in tests and offline runs.

mod states;

pub use states::{
    CachedStateNames, DEFAULT_STATES_URL, StateNameResolver, StateNames, StaticStateNames,
    WebStateNames, apply_state_names, parse_state_table, resolve_or_static,
};
