pub mod actor;
pub mod bloc;
pub mod note;
pub mod tag;
pub mod warehouse;

pub use actor::UserRef;
pub use bloc::{Bloc, Container, CustomField, Position};
pub use note::Note;
pub use tag::Tag;
pub use warehouse::{Location, Member, Role, Warehouse};
