//! Query destinations.
//!
//! A terminal operation writes into a destination. What it can do depends on
//! the destination's shape: a single record, a growable collection of
//! records, or something else, which operations reject.

use crate::model::{ModelMeta, Record};

/// The shape of a destination, borrowed for one operation.
pub enum Shape<'a> {
    /// A single record, filled in place.
    Record(&'a mut dyn Record),
    /// A collection, cleared and then grown one element per row.
    Collection(&'a mut dyn Collection),
    /// Anything else, named by its Rust type.
    Unsupported(&'static str),
}

impl Shape<'_> {
    /// Table metadata of the record or element type, if there is one.
    pub fn meta(&self) -> Option<ModelMeta> {
        match self {
            Shape::Record(record) => Some(record.record_meta()),
            Shape::Collection(collection) => Some(collection.element_meta()),
            Shape::Unsupported(_) => None,
        }
    }
}

/// Anything a terminal operation can write into.
///
/// `#[derive(Model)]` implements this for the model itself; `Vec<M>` and
/// `Vec<Box<M>>` get it through [`Element`].
pub trait Destination {
    fn shape(&mut self) -> Shape<'_>;
}

/// A growable collection of records.
pub trait Collection {
    /// Metadata of the element type, available even when empty.
    fn element_meta(&self) -> ModelMeta;

    fn clear_elements(&mut self);

    /// Append a default element and return it for scanning.
    fn push_element(&mut self) -> &mut dyn Record;

    fn element_count(&self) -> usize;
}

/// Element types a `Vec` destination can hold.
///
/// Implemented for `M` and `Box<M>` of every derived model, so that the
/// element indirection of the destination is preserved.
pub trait Element: Sized {
    fn element_meta() -> ModelMeta;

    fn new_element() -> Self;

    fn as_record(&mut self) -> &mut dyn Record;
}

impl<E: Element> Collection for Vec<E> {
    fn element_meta(&self) -> ModelMeta {
        E::element_meta()
    }

    fn clear_elements(&mut self) {
        self.clear();
    }

    fn push_element(&mut self) -> &mut dyn Record {
        let index = self.len();
        self.push(E::new_element());
        self[index].as_record()
    }

    fn element_count(&self) -> usize {
        self.len()
    }
}

impl<E: Element> Destination for Vec<E> {
    fn shape(&mut self) -> Shape<'_> {
        Shape::Collection(self)
    }
}

macro_rules! unsupported_destination {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Destination for $ty {
                fn shape(&mut self) -> Shape<'_> {
                    Shape::Unsupported(std::any::type_name::<$ty>())
                }
            }
        )+
    };
}

unsupported_destination!(
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    u64,
    f32,
    f64,
    String,
    crate::Value,
    serde_json::Value,
);
