//! Built-in tools

pub mod arithmetic;
pub mod http;
pub mod weather;
pub mod wikipedia;

pub use arithmetic::{
    format_number, AddNumbersToolFactory, ArithmeticOp, ArithmeticTool,
    DivideNumbersToolFactory, MultiplyNumbersToolFactory, SubtractNumbersToolFactory,
};
pub use weather::{GetTemperatureTool, GetTemperatureToolFactory};
pub use wikipedia::{
    SearchWikipediaPageTool, SearchWikipediaPageToolFactory, WikipediaApi,
    WikipediaCoordinatesTool, WikipediaCoordinatesToolFactory, WikipediaSummaryTool,
    WikipediaSummaryToolFactory,
};
