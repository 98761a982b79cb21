mod analysis;
mod chat;
mod controls;
mod details;
mod panels;
