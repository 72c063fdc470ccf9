//! Topic naming for distributed record types.

/// A record type that travels on its own topic of the distribution channel.
///
/// Every model's record of a given type shares the topic; the key inside the
/// topic tells the records apart.
pub trait Topic {
    /// Topic name, unique per record type.
    const TOPIC: &'static str;
}
