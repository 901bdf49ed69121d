// Create-versus-update routing keyed on the record identifier sentinel.

/// Identifier value marking a record that has never been persisted.
///
/// The registry assigns real identifiers on creation, so callers submit new
/// records with id 0 and the client routes them to a create request. Every
/// other value, including negative ones, addresses an existing record.
///
/// The sentinel is the only new-record signal, so an intended update of a
/// record carrying id 0 is indistinguishable from a create. Registries must
/// never hand out 0 as a real identifier.
pub const UNSAVED_ID: i64 = 0;

/// How a save call reaches the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// POST to the collection; the server assigns the identifier.
    Create,
    /// PUT to the member resource at this identifier.
    Update { id: i64 },
}

impl Operation {
    /// Pick the operation for a record carrying `id`.
    pub fn for_id(id: i64) -> Operation {
        if id == UNSAVED_ID {
            Operation::Create
        } else {
            Operation::Update { id }
        }
    }
}
