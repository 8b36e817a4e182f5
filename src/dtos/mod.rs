pub mod analysisdtos;
pub mod leaddtos;
pub mod userdtos;
