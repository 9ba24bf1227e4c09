pub mod inspect;
pub mod regions;
pub mod run;
pub mod simplify;
