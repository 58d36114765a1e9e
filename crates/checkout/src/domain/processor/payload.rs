use {
    super::Inputs,
    crate::{domain::checkout::State, infra::api::Payload},
};

/// Builds the order payload from the latest inputs. Payment fields are only
/// sent when the cart needs payment.
pub fn build(inputs: &Inputs, state: &State) -> Payload {
    let (payment_method, payment_data) = if inputs.cart_needs_payment {
        (
            inputs.payment.payment_method_id().map(str::to_owned),
            Some(inputs.payment.sanitized()),
        )
    } else {
        (None, None)
    };
    Payload {
        billing_address: inputs.billing_address.clone(),
        shipping_address: inputs.shipping_address.clone(),
        customer_note: state.order_notes.clone(),
        should_create_account: state.should_create_account,
        payment_method,
        payment_data,
    }
}
