mod legacy;
mod run;
mod uslm;
mod xml_tree;

pub use run::run;
