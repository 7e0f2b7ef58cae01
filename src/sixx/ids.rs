use uuid::Uuid;

/// Node identifiers for one document, handed out in traversal order.
#[derive(Debug, Default)]
pub(crate) struct IdSequence {
    next: u32,
}

impl IdSequence {
    pub(crate) fn allocate(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// Produces the unique identifiers FLProg attaches to blocks, pins and
/// parameters.
///
/// Abstracting this keeps rendering deterministic under test.
pub trait UuidSource {
    fn next_uuid(&mut self) -> String;
}

/// Fresh random v4 UUIDs.
#[derive(Debug, Default)]
pub struct RandomUuids;

impl UuidSource for RandomUuids {
    fn next_uuid(&mut self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Counting UUIDs (`00000000-0000-0000-0000-000000000001`, ...).
#[derive(Debug, Default)]
pub struct SequentialUuids {
    issued: u128,
}

impl UuidSource for SequentialUuids {
    fn next_uuid(&mut self) -> String {
        self.issued += 1;
        Uuid::from_u128(self.issued).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_start_at_zero_and_increase() {
        let mut ids = IdSequence::default();
        assert_eq!(ids.allocate(), 0);
        assert_eq!(ids.allocate(), 1);
        assert_eq!(ids.allocate(), 2);
    }

    #[test]
    fn random_uuids_are_unique() {
        let mut uuids = RandomUuids;
        let first = uuids.next_uuid();
        assert_ne!(first, uuids.next_uuid());
        assert_eq!(first.len(), 36);
    }

    #[test]
    fn sequential_uuids_count_up() {
        let mut uuids = SequentialUuids::default();
        assert_eq!(uuids.next_uuid(), "00000000-0000-0000-0000-000000000001");
        assert_eq!(uuids.next_uuid(), "00000000-0000-0000-0000-000000000002");
    }
}
