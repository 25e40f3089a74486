
pub mod attributes;
pub mod bounds;
pub mod chunk;
pub mod header;
pub mod options;
pub mod vector3;
