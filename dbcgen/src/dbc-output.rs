/*
 * Copyright (C) 2015-2023 IoT.bzh Company
 * Author: Fulup Ar Foll <fulup@iot.bzh>
 *
 * Redpesk interface code/config use MIT License and can be freely copy/modified even within proprietary code
 * License: $RP_BEGIN_LICENSE$ SPDX:MIT https://opensource.org/licenses/MIT $RP_END_LICENSE$
 */

pub const IDT0: &str = "";
pub const IDT1: &str = "    ";
pub const IDT2: &str = "        ";
pub const IDT3: &str = "            ";
pub const IDT4: &str = "                ";
pub const IDT5: &str = "                    ";

#[macro_export]
macro_rules! code_output {
 ($code:expr, $indent:expr, $format:expr, $( $args:expr ),*) => {
    $code.output ($indent,  format! ($format, $($args),*))
 };
 ($code:expr, $indent:expr, $format:expr) => {
    $code.output ($indent, $format)
 }
}

/// One emitted source unit, filled line by line.
#[derive(Debug, Default, Clone)]
pub struct CodeUnit {
    text: String,
}

pub trait Text2Str<T> {
    /// Append one line with indentation.
    fn write(&mut self, indent: &str, text: T);
}

impl Text2Str<&str> for CodeUnit {
    fn write(&mut self, indent: &str, text: &str) {
        self.text.push_str(indent);
        self.text.push_str(text);
        self.text.push('\n');
    }
}

impl Text2Str<String> for CodeUnit {
    fn write(&mut self, indent: &str, text: String) {
        <Self as Text2Str<&str>>::write(self, indent, text.as_str());
    }
}

impl CodeUnit {
    #[must_use]
    pub fn new() -> Self {
        CodeUnit::default()
    }

    pub fn output<T>(&mut self, indent: &str, text: T)
    where
        CodeUnit: Text2Str<T>,
    {
        Self::write(self, indent, text);
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.text.as_str()
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.text
    }
}
