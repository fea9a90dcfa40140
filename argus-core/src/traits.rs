use crate::events::{OrderBook, Ticker, Trade};

/// Consumer of parsed market data. Methods run on the owning venue's I/O
/// task and must not block; a sink shared across venues synchronizes
/// itself.
pub trait MarketSink: Send + Sync {
    fn on_ticker(&self, ticker: Ticker);
    fn on_trade(&self, trade: Trade);
    fn on_order_book(&self, book: OrderBook);
}
