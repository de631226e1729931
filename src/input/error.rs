use thiserror::Error;

/// Misuse of an [`InputSource`](super::InputSource) or [`InputRegistry`](super::InputRegistry).
///
/// These are contract violations by the caller, never transient conditions, so
/// nothing in the input layer retries on them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("cannot read the value of `{name}`: it is not an axis input")]
    NotAxis { name: String },

    #[error(
        "cannot read default input `{name}` because it has been disabled; \
         enable the defaults to access it"
    )]
    DefaultDisabled { name: String },

    #[error("input `{name}` is not tracked; available inputs are: ({})", .tracked.join(", "))]
    UnknownInput { name: String, tracked: Vec<String> },
}
