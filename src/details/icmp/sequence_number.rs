type SequenceNumberInnerType = u16;
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub(crate) struct SequenceNumber(SequenceNumberInnerType);

impl SequenceNumber {
    pub(crate) fn start_value() -> SequenceNumber {
        // Echo sequence numbers of a run start from 1.
        SequenceNumber(1)
    }

    /// Sequence numbers `1..=count`, one per probe of a run.
    pub(crate) fn range(count: u16) -> impl Iterator<Item = SequenceNumber> {
        (Self::start_value().0..=count).map(SequenceNumber)
    }
}

impl From<SequenceNumber> for SequenceNumberInnerType {
    fn from(value: SequenceNumber) -> Self {
        value.0
    }
}

impl From<SequenceNumberInnerType> for SequenceNumber {
    fn from(value: SequenceNumberInnerType) -> Self {
        SequenceNumber(value)
    }
}
