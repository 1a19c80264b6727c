//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter         | Implements         | Connects to                  |
//! |-----------------|--------------------|------------------------------|
//! | `hardware`      | SensorPort         | DHT22, LDR (ADC1), PIR, HC-SR04 |
//! |                 | IrTransmitPort     | RMT channel 0 (IR LED)       |
//! |                 | InputPort          | Button GPIO, IR receiver ISR |
//! |                 | StatusPort         | Status LED                   |
//! | `log_sink`      | EventSink          | Serial log output            |
//! | `advisory_http` | (worker thread)    | Advisory service over HTTPS  |
//! | `wifi`          | (none)             | ESP-IDF Wi-Fi STA + Wi-Fi LED |
//! | `time`          | (none)             | ESP32 system timer           |

pub mod advisory_http;
pub mod hardware;
pub mod log_sink;
pub mod time;
pub mod wifi;
