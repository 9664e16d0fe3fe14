pub mod api_v1;
pub mod dimacs;
pub mod sat;
