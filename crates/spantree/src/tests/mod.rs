mod msgpack;
mod pointer;
mod roundtrip;
