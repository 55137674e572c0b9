//! Runs every manifest resource of a cartridge through the processor chain.

use serde::Serialize;
use tracing::{error, warn};

use crate::cartridge::Cartridge;
use crate::processors::{ConversionState, ProcessingContext, Processed, ProcessorChain};
use crate::settings::ConversionOptions;

#[derive(Debug)]
pub struct ConvertedResource {
    pub identifier: String,
    pub processed: Processed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedResource {
    pub identifier: String,
    pub error: String,
}

/// Outcome of one conversion run.
#[derive(Debug, Default)]
pub struct Conversion {
    pub converted: Vec<ConvertedResource>,
    pub unresolved: Vec<String>,
    pub failed: Vec<FailedResource>,
    pub state: ConversionState,
}

/// Summary written next to the generated OLX.
#[derive(Debug, Serialize)]
pub struct ConversionReport<'a> {
    pub converted: Vec<ReportEntry<'a>>,
    pub unresolved: &'a [String],
    pub failed: &'a [FailedResource],
    #[serde(flatten)]
    pub state: &'a ConversionState,
}

#[derive(Debug, Serialize)]
pub struct ReportEntry<'a> {
    pub identifier: &'a str,
    pub processor: &'static str,
    pub nodes: usize,
}

impl Conversion {
    pub fn report(&self) -> ConversionReport<'_> {
        ConversionReport {
            converted: self
                .converted
                .iter()
                .map(|resource| ReportEntry {
                    identifier: &resource.identifier,
                    processor: resource.processed.processor,
                    nodes: resource.processed.nodes.len(),
                })
                .collect(),
            unresolved: &self.unresolved,
            failed: &self.failed,
            state: &self.state,
        }
    }
}

/// Converts the resources in manifest order. A failing resource is logged
/// and recorded without stopping the run.
pub fn convert_cartridge(
    cartridge: &Cartridge,
    options: &ConversionOptions,
    chain: &ProcessorChain,
) -> Conversion {
    let mut conversion = Conversion::default();

    for identifier in cartridge.resource_ids() {
        let mut cx = ProcessingContext {
            cartridge,
            options,
            state: &mut conversion.state,
        };

        match chain.process(Some(identifier), &mut cx) {
            Ok(Some(processed)) => conversion.converted.push(ConvertedResource {
                identifier: identifier.to_string(),
                processed,
            }),
            Ok(None) => {
                warn!(identifier, "no processor produced content for resource");
                conversion.unresolved.push(identifier.to_string());
            }
            Err(err) => {
                error!(identifier, "failed to convert resource: {:#}", err);
                conversion.failed.push(FailedResource {
                    identifier: identifier.to_string(),
                    error: format!("{:#}", err),
                });
            }
        }
    }

    conversion
}
