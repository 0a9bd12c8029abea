pub mod push_message;
