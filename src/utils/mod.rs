pub mod deadline;
pub mod jwt;
pub mod multipart;
pub mod password;
pub mod response;
