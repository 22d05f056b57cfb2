pub mod status_group;
