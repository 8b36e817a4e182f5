pub mod analysisdb;
pub mod authdb;
pub mod db;
pub mod leaddb;
pub mod userdb;
