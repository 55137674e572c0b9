pub mod cartridge;
pub mod content;
pub mod conversion;
pub mod generators;
pub mod links;
pub mod olx;
pub mod processors;
pub mod settings;
pub mod xml;

#[cfg(test)]
mod testing;
