pub mod blocs;
pub mod notes;
pub mod tags;
pub mod warehouses;
