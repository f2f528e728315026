pub mod profile2;
