pub mod artwork;
pub mod import_run;
