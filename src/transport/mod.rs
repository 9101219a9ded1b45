pub mod ws_client;
