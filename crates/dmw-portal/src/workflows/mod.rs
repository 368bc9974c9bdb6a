pub mod direct_hire;
