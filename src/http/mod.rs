pub mod client;
pub mod request;
pub mod response;

#[cfg(test)]
pub mod testing;
