pub mod activity;
pub mod movies;
pub mod segments;
