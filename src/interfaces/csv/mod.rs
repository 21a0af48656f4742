pub mod registration_writer;
