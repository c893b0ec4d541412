pub mod market_tick;
