pub mod mexc;
